mod classification;
mod common;
mod ledger;
