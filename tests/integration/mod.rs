mod basic_integration;
mod spreadsheet_session;
