mod health_test;
mod photos_test;
mod reports_test;
mod tickets_test;
