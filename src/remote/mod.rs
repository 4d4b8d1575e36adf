pub mod airtable;
pub mod supabase;
