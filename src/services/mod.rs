pub mod measurement_api;
