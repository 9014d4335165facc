pub mod file;
pub mod firestore;
pub mod memory;
use anyhow::Result;

use crate::domain::models::StoreBox;
use crate::domain::models::StoreName;

pub struct StoreManager {}

impl StoreManager {
    pub fn get(name: StoreName) -> Result<StoreBox> {
        match name {
            StoreName::Memory => return Ok(Box::<memory::Memory>::default()),
            StoreName::File => return Ok(Box::<file::File>::default()),
            StoreName::Firestore => return Ok(Box::<firestore::Firestore>::default()),
        }
    }
}
