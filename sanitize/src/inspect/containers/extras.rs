//! Allow-listed terminal value types.
//!
//! IP addresses under a rule keep only their last segment when masked, so the
//! value stays a valid address of the same family.

use std::{
    net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr},
    path::PathBuf,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use super::own_type_key;
use crate::{
    error::MaskFailure,
    inspect::{Inspect, Shape},
    mask::MaskContext,
    rules::Redaction,
};

/// Implements `Inspect` for a terminal.
///
/// `text` renders the value, `neutral` computes its masked replacement.
macro_rules! impl_terminal {
    ($ty:ty, text: |$tv:ident| $text:expr, neutral: |$nv:pat_param| $neutral:expr $(,)?) => {
        impl Inspect for $ty {
            own_type_key!();

            fn shape(&self) -> Shape<'_> {
                let $tv = self;
                $text
            }

            fn redact_with(
                &mut self,
                _redaction: &Redaction<'_>,
                _cx: &mut MaskContext<'_>,
            ) -> Result<(), MaskFailure> {
                let $nv = &*self;
                *self = $neutral;
                Ok(())
            }

            fn redacted_text(&self, redaction: &Redaction<'_>) -> Option<String> {
                self.shape()
                    .terminal_text()
                    .map(|text| redaction.strategy().redact(&text))
            }
        }
    };
}

fn mask_ipv4(addr: Ipv4Addr) -> Ipv4Addr {
    Ipv4Addr::new(0, 0, 0, addr.octets()[3])
}

fn mask_ipv6(addr: Ipv6Addr) -> Ipv6Addr {
    Ipv6Addr::new(0, 0, 0, 0, 0, 0, 0, addr.segments()[7])
}

fn mask_ip(addr: IpAddr) -> IpAddr {
    match addr {
        IpAddr::V4(v4) => IpAddr::V4(mask_ipv4(v4)),
        IpAddr::V6(v6) => IpAddr::V6(mask_ipv6(v6)),
    }
}

impl_terminal!(Ipv4Addr, text: |addr| Shape::display(addr), neutral: |addr| mask_ipv4(*addr));
impl_terminal!(Ipv6Addr, text: |addr| Shape::display(addr), neutral: |addr| mask_ipv6(*addr));
impl_terminal!(IpAddr, text: |addr| Shape::display(addr), neutral: |addr| mask_ip(*addr));
impl_terminal!(
    SocketAddr,
    text: |addr| Shape::display(addr),
    neutral: |addr| SocketAddr::new(mask_ip(addr.ip()), addr.port()),
);

impl_terminal!(
    Duration,
    text: |duration| Shape::rendered(format!("{duration:?}")),
    neutral: |_| Duration::ZERO,
);
impl_terminal!(
    SystemTime,
    text: |time| Shape::rendered(match time.duration_since(UNIX_EPOCH) {
        Ok(since) => format!("{}s since epoch", since.as_secs()),
        Err(_) => format!("{time:?}"),
    }),
    neutral: |_| UNIX_EPOCH,
);
impl_terminal!(
    PathBuf,
    text: |path| Shape::rendered(path.display().to_string()),
    neutral: |_| PathBuf::new(),
);

#[cfg(feature = "uuid")]
impl_terminal!(uuid::Uuid, text: |id| Shape::display(id), neutral: |_| uuid::Uuid::nil());

#[cfg(feature = "chrono")]
impl_terminal!(
    chrono::DateTime<chrono::Utc>,
    text: |at| Shape::display(at),
    neutral: |_| chrono::DateTime::<chrono::Utc>::default(),
);

#[cfg(feature = "chrono")]
impl_terminal!(
    chrono::NaiveDate,
    text: |date| Shape::display(date),
    neutral: |_| chrono::NaiveDate::default(),
);

#[cfg(feature = "chrono")]
impl_terminal!(
    chrono::NaiveDateTime,
    text: |at| Shape::display(at),
    neutral: |_| chrono::NaiveDateTime::default(),
);

#[cfg(feature = "time")]
impl_terminal!(
    time::OffsetDateTime,
    text: |at| Shape::display(at),
    neutral: |_| time::OffsetDateTime::UNIX_EPOCH,
);
