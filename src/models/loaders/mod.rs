pub mod csv_loader;

pub use csv_loader::{load_input_file, read_input, InputRow, InputSet};
