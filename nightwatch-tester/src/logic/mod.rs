pub mod game_tester;
pub mod policy;
pub mod progress_file;
pub mod reports;
pub mod seeds;
pub mod tester;

pub use game_tester::{GameTester, SimulationPlan, SimulationSummary};
pub use policy::OperatorStrategy;
pub use progress_file::FileProgressStore;
pub use seeds::{SeedInfo, resolve_nights, resolve_seed_inputs};
pub use tester::*;
