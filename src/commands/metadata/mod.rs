mod canonical;
mod demultiplexing;
mod read_cycles;
mod run;
mod run_folder;
mod summary;

pub use read_cycles::first_read_length;
pub use run::run;
pub use run_folder::{ReadLayoutSource, RunFolder};

use canonical::*;
use demultiplexing::*;
use read_cycles::*;
use summary::*;
