pub mod gemini;
use anyhow::Result;

use crate::domain::models::BackendBox;
use crate::domain::models::BackendName;

pub struct BackendManager {}

impl BackendManager {
    pub fn get(name: BackendName) -> Result<BackendBox> {
        match name {
            BackendName::Gemini => return Ok(Box::<gemini::Gemini>::default()),
        }
    }
}
