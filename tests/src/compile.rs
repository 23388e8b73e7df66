#![cfg(test)]
mod devices;
mod interfaces;
