mod dispatch;
mod integration;
