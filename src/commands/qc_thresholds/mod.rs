mod config;
mod mapping;
mod run;
#[cfg(test)]
mod tests;

pub use run::run;

use config::*;
use mapping::*;
