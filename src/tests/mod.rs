pub mod record_tests;
