mod helpers;

mod basic_tests;
mod error_tests;
mod suspend_tests;
