mod basic;
mod resubscribe;
