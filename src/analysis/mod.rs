pub mod boltzmann;
pub mod interaction;
