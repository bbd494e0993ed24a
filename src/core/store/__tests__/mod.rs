pub mod prefetch_test;
