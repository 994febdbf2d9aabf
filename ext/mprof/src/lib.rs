mod ruby_init;

mod report_serializer;
mod ruby_api;
mod ruby_host;
mod util;
