//! Low-level astronomy for the lunisolar calendar: new moons, apparent solar
//! longitude and the TT/UT correction. Algorithms follow Meeus,
//! "Astronomical Algorithms" (2nd ed.), chapters 25 and 49.

use chrono::{Datelike, NaiveDate};

/// Mean synodic month in days.
pub const SYNODIC_MONTH: f64 = 29.530588861;

/// JDE of the mean new moon with lunation number 0 (2000-01-06).
pub const LUNATION_EPOCH: f64 = 2451550.09766;

/// China Standard Time offset in hours.
pub const TIME_ZONE_HOURS: f64 = 8.0;

const J2000: f64 = 2451545.0;

/// Julian Day Number of a Gregorian date.
pub fn julian_day_number(date: NaiveDate) -> i64 {
    let (year, month, day) = (date.year() as i64, date.month() as i64, date.day() as i64);
    let a = (14 - month) / 12;
    let y = year + 4800 - a;
    let m = month + 12 * a - 3;
    day + (153 * m + 2) / 5 + 365 * y + y / 4 - y / 100 + y / 400 - 32045
}

pub fn date_from_julian_day_number(jdn: i64) -> Option<NaiveDate> {
    // JDN 1721426 is 0001-01-01, day 1 of the common era.
    let days = i32::try_from(jdn - 1_721_425).ok()?;
    NaiveDate::from_num_days_from_ce_opt(days)
}

/// Lunation number of the last mean new moon at or before `jd`.
pub fn lunation_before(jd: f64) -> i64 {
    ((jd - LUNATION_EPOCH) / SYNODIC_MONTH).floor() as i64
}

/// Local (UTC+8) day number on which new moon `k` falls.
pub fn new_moon_day(k: i64) -> i64 {
    let jde = new_moon_jde(k);
    let jd_ut = jde - delta_t_seconds(jde) / 86_400.0;
    (jd_ut + 0.5 + TIME_ZONE_HOURS / 24.0).floor() as i64
}

/// Which 30-degree sector (0..=11) the sun occupies at local midnight
/// starting the given day number. Sector 0 begins at the March equinox.
pub fn sun_sector(day_number: i64) -> u32 {
    let jd = day_number as f64 - 0.5 - TIME_ZONE_HOURS / 24.0;
    (sun_longitude(jd) / 30.0).floor() as u32 % 12
}

/// Time of the true new moon for lunation `k`, in Julian Ephemeris Days.
pub fn new_moon_jde(k: i64) -> f64 {
    let k = k as f64;
    let t = k / 1236.85;
    let t2 = t * t;
    let t3 = t2 * t;
    let t4 = t3 * t;

    let mut jde = LUNATION_EPOCH + SYNODIC_MONTH * k + 0.00015437 * t2 - 0.000000150 * t3
        + 0.00000000073 * t4;

    let e = 1.0 - 0.002516 * t - 0.0000074 * t2;
    let m = deg(2.5534 + 29.10535670 * k - 0.0000014 * t2 - 0.00000011 * t3);
    let mp = deg(201.5643 + 385.81693528 * k + 0.0107582 * t2 + 0.00001238 * t3
        - 0.000000058 * t4);
    let f = deg(160.7108 + 390.67050284 * k - 0.0016118 * t2 - 0.00000227 * t3
        + 0.000000011 * t4);
    let omega = deg(124.7746 - 1.56375588 * k + 0.0020672 * t2 + 0.00000215 * t3);

    jde += -0.40720 * mp.sin()
        + 0.17241 * e * m.sin()
        + 0.01608 * (2.0 * mp).sin()
        + 0.01039 * (2.0 * f).sin()
        + 0.00739 * e * (mp - m).sin()
        - 0.00514 * e * (mp + m).sin()
        + 0.00208 * e * e * (2.0 * m).sin()
        - 0.00111 * (mp - 2.0 * f).sin()
        - 0.00057 * (mp + 2.0 * f).sin()
        + 0.00056 * e * (2.0 * mp + m).sin()
        - 0.00042 * (3.0 * mp).sin()
        + 0.00042 * e * (m + 2.0 * f).sin()
        + 0.00038 * e * (m - 2.0 * f).sin()
        - 0.00024 * e * (2.0 * mp - m).sin()
        - 0.00017 * omega.sin()
        - 0.00007 * (mp + 2.0 * m).sin()
        + 0.00004 * (2.0 * mp - 2.0 * f).sin()
        + 0.00004 * (3.0 * m).sin()
        + 0.00003 * (mp + m - 2.0 * f).sin()
        + 0.00003 * (2.0 * mp + 2.0 * f).sin()
        - 0.00003 * (mp + m + 2.0 * f).sin()
        + 0.00003 * (mp - m + 2.0 * f).sin()
        - 0.00002 * (mp - m - 2.0 * f).sin()
        - 0.00002 * (3.0 * mp + m).sin()
        + 0.00002 * (4.0 * mp).sin();

    // Planetary arguments
    let planetary: [(f64, f64); 14] = [
        (0.000325, 299.77 + 0.107408 * k - 0.009173 * t2),
        (0.000165, 251.88 + 0.016321 * k),
        (0.000164, 251.83 + 26.651886 * k),
        (0.000126, 349.42 + 36.412478 * k),
        (0.000110, 84.66 + 18.206239 * k),
        (0.000062, 141.74 + 53.303771 * k),
        (0.000060, 207.14 + 2.453732 * k),
        (0.000056, 154.84 + 7.306860 * k),
        (0.000047, 34.52 + 27.261239 * k),
        (0.000042, 207.19 + 0.121824 * k),
        (0.000040, 291.34 + 1.844379 * k),
        (0.000037, 161.72 + 24.198154 * k),
        (0.000035, 239.56 + 25.513099 * k),
        (0.000023, 331.55 + 3.592518 * k),
    ];
    jde += planetary
        .iter()
        .map(|(coefficient, angle)| coefficient * deg(*angle).sin())
        .sum::<f64>();

    jde
}

/// Apparent geocentric longitude of the sun in degrees, `[0, 360)`.
pub fn sun_longitude(jd: f64) -> f64 {
    let t = (jd - J2000) / 36525.0;
    let t2 = t * t;

    let l0 = 280.46646 + 36000.76983 * t + 0.0003032 * t2;
    let m = deg(357.52911 + 35999.05029 * t - 0.0001537 * t2);
    let c = (1.914602 - 0.004817 * t - 0.000014 * t2) * m.sin()
        + (0.019993 - 0.000101 * t) * (2.0 * m).sin()
        + 0.000289 * (3.0 * m).sin();
    let omega = deg(125.04 - 1934.136 * t);

    (l0 + c - 0.00569 - 0.00478 * omega.sin()).rem_euclid(360.0)
}

/// ΔT = TT − UT in seconds (Espenak & Meeus polynomial fits).
pub fn delta_t_seconds(jd: f64) -> f64 {
    let y = 2000.0 + (jd - J2000) / 365.25;

    if y < 1860.0 || y >= 2150.0 {
        let u = (y - 1820.0) / 100.0;
        return -20.0 + 32.0 * u * u;
    }

    if y < 1900.0 {
        let t = y - 1860.0;
        return 7.62 + 0.5737 * t - 0.251754 * t.powi(2) + 0.01680668 * t.powi(3)
            - 0.0004473624 * t.powi(4)
            + t.powi(5) / 233174.0;
    }

    if y < 1920.0 {
        let t = y - 1900.0;
        return -2.79 + 1.494119 * t - 0.0598939 * t.powi(2) + 0.0061966 * t.powi(3)
            - 0.000197 * t.powi(4);
    }

    if y < 1941.0 {
        let t = y - 1920.0;
        return 21.20 + 0.84493 * t - 0.076100 * t.powi(2) + 0.0020936 * t.powi(3);
    }

    if y < 1961.0 {
        let t = y - 1950.0;
        return 29.07 + 0.407 * t - t.powi(2) / 233.0 + t.powi(3) / 2547.0;
    }

    if y < 1986.0 {
        let t = y - 1975.0;
        return 45.45 + 1.067 * t - t.powi(2) / 260.0 - t.powi(3) / 718.0;
    }

    if y < 2005.0 {
        let t = y - 2000.0;
        return 63.86 + 0.3345 * t - 0.060374 * t.powi(2) + 0.0017275 * t.powi(3)
            + 0.000651814 * t.powi(4)
            + 0.00002373599 * t.powi(5);
    }

    if y < 2050.0 {
        let t = y - 2000.0;
        return 62.92 + 0.32217 * t + 0.005589 * t.powi(2);
    }

    let u = (y - 1820.0) / 100.0;
    -20.0 + 32.0 * u * u - 0.5628 * (2150.0 - y)
}

fn deg(degrees: f64) -> f64 {
    degrees.rem_euclid(360.0).to_radians()
}
