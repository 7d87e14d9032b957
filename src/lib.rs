/**
 * Generate weighted mock and practice papers from a shared question bank.
 *
 * Author:  Ian Fisher (iafisher@fastmail.com)
 * Version: August 2026
 */
pub mod allocation;
pub mod bank;
pub mod common;
pub mod paper;
pub mod persistence;
pub mod selection;
