//! Link results for satlink
//!
//! BLER-versus-SNR curves used to derive the Eb/N0 and C/N0 requirements of
//! return-link waveforms and forward-link MODCODs.

pub mod link_results;
pub mod lookup;

pub use link_results::{LinkResults, LinkResultsFwd, LinkResultsRtn};
pub use lookup::LookUpTable;
