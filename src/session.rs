/// One recorded death: where the run ended, in world coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionRecord {
    pub x: f64,
    pub y: f64,
}

impl SessionRecord {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for SessionRecord {
    fn from(v: (f64, f64)) -> Self {
        SessionRecord { x: v.0, y: v.1 }
    }
}

/// Holds the sessions of the most recent folder pick.
///
/// Starts out idle (`None`). Every pick swaps in a whole new list and bumps
/// the generation so views know to repaint; lists are never merged.
#[derive(Debug, Default, Clone)]
pub struct SessionStore {
    sessions: Option<Vec<SessionRecord>>,
    generation: u64,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, sessions: Vec<SessionRecord>) {
        self.sessions = Some(sessions);
        self.generation += 1;
    }

    pub fn sessions(&self) -> Option<&[SessionRecord]> {
        self.sessions.as_deref()
    }

    pub fn is_loaded(&self) -> bool {
        self.sessions.is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
