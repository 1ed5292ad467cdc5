mod customers;
mod helpers;
mod mocks;
mod orders;
mod pos;
