pub mod record_data;
