mod category_shares;
mod credentials;
mod groups;
mod health;
mod members;
