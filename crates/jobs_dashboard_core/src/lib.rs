pub mod aggregate;
pub mod decode;
pub mod domain;
pub mod endpoints;
pub mod filters;
pub mod period;
pub mod persistence;
pub mod ports;
pub mod query;
pub mod session;
pub mod stores;

pub use domain::{CompanyCount, Domain, JobRow, Location, SkillCount};
pub use filters::FilterModel;
pub use period::{DateRange, DateWindow, Period, PeriodSelection};
pub use persistence::{MemoryStore, PersistencePort};
pub use ports::{
    Clock, DownloadSink, FixedClock, HttpClient, HttpResponse, KeyValueStore, PortError,
    PortResult, SystemClock,
};
pub use query::{EndpointShape, ParamValue, QueryParams};
pub use session::SessionManager;
pub use stores::{FilteredStore, Slot, StoreError, StorePorts};
