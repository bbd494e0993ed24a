pub mod snapshot_test;
