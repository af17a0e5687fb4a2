pub mod domain;
pub mod export;
pub mod period;
pub mod ports;

pub use domain::{
    AuthSession, Event, EventPatch, EventRecord, EventStats, EventStatus, EventWithRecords,
    NewEvent, NewEventRecord, PeriodEvent, PeriodRecord, Profile, Role, UserCredentials,
};
pub use period::PeriodKind;
pub use ports::{
    ClosureSummaryService, EventStore, PeriodSummaryService, PortError, PortResult,
    RecordSummaryService,
};
