//! Shared test harness modules for the Haulway CLI.

use super::*;

mod analyse_steps;
mod helpers;
mod unit;
