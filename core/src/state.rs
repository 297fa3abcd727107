use crate::game::BoardLayout;

#[derive(Clone, Debug)]
pub struct BoardState {
    pub n: u32,
    pub image_width: u32,
    pub image_height: u32,
    pub container_width: f32,
    pub container_height: f32,
    pub layout: Option<BoardLayout>,
    pub positions: Vec<(f32, f32)>,
    pub locked: Vec<bool>,
    pub z: Vec<u32>,
    pub solved: bool,
    pub scatter_nonce: u32,
}

impl BoardState {
    pub fn empty() -> Self {
        Self {
            n: 0,
            image_width: 0,
            image_height: 0,
            container_width: 0.0,
            container_height: 0.0,
            layout: None,
            positions: Vec::new(),
            locked: Vec::new(),
            z: Vec::new(),
            solved: false,
            scatter_nonce: 0,
        }
    }

    pub fn total_pieces(&self) -> usize {
        self.positions.len()
    }

    pub fn has_board(&self) -> bool {
        self.layout.is_some() && !self.positions.is_empty()
    }
}

impl Default for BoardState {
    fn default() -> Self {
        Self::empty()
    }
}
