use crate::types::SimDate;
use thiserror::Error;

/// Every error in the core is fatal: the run aborts on the first one.
#[derive(Error, Debug)]
pub enum SimError {
    #[error(
        "Inventory depleted at location '{location}' on {date}: component '{component}' \
         from supplier '{supplier}' needs {requested} units, only {available} usable"
    )]
    InventoryDepleted {
        location:  String,
        date:      SimDate,
        component: String,
        supplier:  String,
        requested: u64,
        available: u64,
    },

    #[error("No day data for location '{location}' on {date}")]
    MissingDayData { location: String, date: SimDate },

    #[error("No quality data for supplier '{supplier}' at location '{location}' on {date}")]
    MissingSupplierQuality {
        location: String,
        supplier: String,
        date:     SimDate,
    },

    #[error("Location '{location}' has no inventory row for supplier '{supplier}', component '{component}'")]
    MissingInventoryRow {
        location:  String,
        supplier:  String,
        component: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SimResult<T> = Result<T, SimError>;
