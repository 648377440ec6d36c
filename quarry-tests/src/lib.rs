mod batch;
mod blocking;
mod crud;
mod errors;
mod mapping;
mod names;
mod queries;

use crate::{
    batch::batch, crud::crud, errors::errors, mapping::mapping, names::names, queries::queries,
};
use log::LevelFilter;
use quarry::{DataContext, Driver};
use std::env;

pub use blocking::execute_blocking_tests;

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

/// Runs every scenario against a fresh store reachable at `url`.
pub async fn execute_tests<D: Driver + Clone>(driver: D, url: &str) {
    let context = DataContext::from_url(driver.clone(), url).expect("Invalid connection url");
    crud(&context).await;
    batch(&context).await;
    queries(&context).await;
    mapping(&context).await;
    names(&context).await;
    errors(&context).await;
}

/// Evaluates the code with logging turned off and returns its value.
#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        let result = { $($code)+ };
        log::set_max_level(level);
        result
    }};
}
