mod simulator;

pub use simulator::{simulate_symbol, SimulatorParams, WARMUP_BARS};
