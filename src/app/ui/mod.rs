mod controls;
mod details;
mod panels;
