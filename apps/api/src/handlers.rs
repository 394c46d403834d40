pub mod health;
pub mod permissions;
pub mod ticket_events;
pub mod users;

#[cfg(test)]
pub(crate) mod test_support;
