//! Response bodies.

use serde::Serialize;

use coffeeshop_core::DrinkId;

/// `{"success": true, "drinks": [...]}`
#[derive(Debug, Serialize)]
pub struct DrinksResponse<T> {
    pub success: bool,
    pub drinks: Vec<T>,
}

impl<T> DrinksResponse<T> {
    pub fn new(drinks: Vec<T>) -> Self {
        Self {
            success: true,
            drinks,
        }
    }
}

/// `{"success": true, "deleted": <id>}`
#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub success: bool,
    pub deleted: DrinkId,
}

impl DeletedResponse {
    pub fn new(id: DrinkId) -> Self {
        Self { success: true, deleted: id }
    }
}
