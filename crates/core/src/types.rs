/// Room and rate-plan ids as issued by the property management backend.
pub type DbId = i64;

/// Calendar days carry no time zone; a day is the property's local date.
pub type CalendarDate = chrono::NaiveDate;
