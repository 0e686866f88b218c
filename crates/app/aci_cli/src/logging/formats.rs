use flexi_logger::{DeferredNow, style};
use log::{Level, Record};

/// `LEVEL message`, coloured by level. Info lines carry no prefix.
pub fn cli_format(
    w: &mut dyn std::io::Write,
    _now: &mut DeferredNow,
    record: &Record,
) -> Result<(), std::io::Error> {
    let level = record.level();
    if level == Level::Info {
        return write!(w, "{}", record.args());
    }
    write!(
        w,
        "{} {}",
        style(level).paint(level.as_str()),
        record.args()
    )
}
