mod growth;
mod money;
mod tax;
mod types;
pub mod validate;

pub use growth::{MONTHS_PER_YEAR, effective_monthly_rate, project, snapshot_count};
pub use money::round_cents;
pub use tax::{FixedIncomeSchedule, notes_for, resolve, resolve_with_schedule};
pub use types::{
    MaxMonths, SimulationRequest, SimulationResult, SimulationSnapshot, TaxBracket, TaxCategory,
    TaxRequest, TaxResult,
};
