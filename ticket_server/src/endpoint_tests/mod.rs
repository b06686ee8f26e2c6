mod helpers;
mod mocks;
mod orders;
mod tickets;
mod webhook;
