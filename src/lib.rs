pub mod jvm;
pub mod program;
pub mod synth;
pub mod util;
