mod challenges;
mod donations;
mod friends;
mod locations;
mod notifications;
mod posts;
mod users;
