use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use chrono::NaiveDate;
use chrono_tz::Tz;
use getopts::{Matches, Options};

use crate::datetime::parse_us_date;

const ADDRESS_ENV: &str = "REC_SCHEDULE_ADDR";
const UPSTREAM_ENV: &str = "REC_SCHEDULE_UPSTREAM";

pub struct Args {
    pub address: SocketAddr,
    pub upstream: Option<String>,
    pub start_param: String,
    pub end_param: String,
    pub timezone: Tz,
    pub enable_cache: bool,
    pub cache_ttl: Duration,
    pub input: Option<PathBuf>,
    pub week: Option<NaiveDate>,
}

fn opts() -> Options {
    let mut opts = Options::new();
    opts.optflag(
        "h",
        "help",
        concat!("Print the help output of ", env!("CARGO_PKG_NAME")),
    );
    opts.optopt(
        "a",
        "address",
        "Socket address (IP and port) to listen on [Default: 127.0.0.1:8080, Env: REC_SCHEDULE_ADDR]",
        "SOCKET_ADDRESS",
    );
    opts.optopt(
        "u",
        "upstream",
        "URL of the schedule page on the booking system [Env: REC_SCHEDULE_UPSTREAM]",
        "URL",
    );
    opts.optopt(
        "",
        "start-param",
        "Query parameter carrying the first day of the range [Default: start]",
        "NAME",
    );
    opts.optopt(
        "",
        "end-param",
        "Query parameter carrying the last day of the range [Default: end]",
        "NAME",
    );
    opts.optopt(
        "z",
        "timezone",
        "IANA timezone the schedule times are given in [Default: America/Chicago]",
        "TIMEZONE",
    );
    opts.optflag(
        "c",
        "enable-cache",
        "Enable caching of extracted schedules [Default: false]",
    );
    opts.optopt(
        "t",
        "cache-ttl",
        "Time-to-live for cached schedules [Default: 600]",
        "SECONDS",
    );
    opts.optopt(
        "i",
        "input",
        "Extract a saved HTML page and print the result as JSON instead of serving",
        "FILE",
    );
    opts.optopt(
        "w",
        "week",
        "Any day of the week to lay out with --input [Default: today]",
        "MM/DD/YYYY",
    );
    opts
}

fn fail(message: String) -> ! {
    eprintln!("{message}");
    process::exit(1);
}

fn opt_or_env(matches: &Matches, name: &str, var: &str) -> Option<String> {
    matches.opt_str(name).or_else(|| env::var(var).ok())
}

pub fn parse(args: Vec<String>) -> Args {
    let opts = opts();

    let matches = match opts.parse(args) {
        Ok(matches) => matches,
        Err(err) => fail(err.to_string()),
    };

    if matches.opt_present("help") {
        println!("{}", opts.usage(&opts.short_usage(env!("CARGO_PKG_NAME"))));
        process::exit(0);
    }

    let address = match opt_or_env(&matches, "address", ADDRESS_ENV) {
        Some(value) => match value.parse::<SocketAddr>() {
            Ok(address) => address,
            Err(err) => fail(format!("Provided value for option 'address' is invalid: {err}")),
        },
        None => SocketAddr::from(([127, 0, 0, 1], 8080)),
    };

    let timezone = match matches.opt_str("timezone") {
        Some(value) => match value.parse::<Tz>() {
            Ok(timezone) => timezone,
            Err(err) => fail(format!("Provided value for option 'timezone' is invalid: {err}")),
        },
        None => chrono_tz::America::Chicago,
    };

    let cache_ttl = match matches.opt_get_default("cache-ttl", 600) {
        Ok(secs) => Duration::from_secs(secs),
        Err(err) => fail(format!("Provided value for option 'cache-ttl' is invalid: {err}")),
    };

    let week = matches.opt_str("week").map(|value| {
        parse_us_date(&value)
            .unwrap_or_else(|| fail(format!("Provided value for option 'week' is invalid: {value}")))
    });

    let input = matches.opt_str("input").map(PathBuf::from);
    let upstream = opt_or_env(&matches, "upstream", UPSTREAM_ENV);

    if input.is_none() && upstream.is_none() {
        fail(format!("Either --upstream (or {UPSTREAM_ENV}) or --input is required"));
    }

    Args {
        address,
        upstream,
        start_param: matches.opt_str("start-param").unwrap_or_else(|| "start".into()),
        end_param: matches.opt_str("end-param").unwrap_or_else(|| "end".into()),
        timezone,
        enable_cache: matches.opt_present("enable-cache"),
        cache_ttl,
        input,
        week,
    }
}
