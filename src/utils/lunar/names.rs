use chrono::NaiveDate;
use serde::Serialize;

use super::astronomy::julian_day_number;
use super::{lunar_month, solar_to_lunar, LunarDate};

const HEAVENLY_STEMS: [&str; 10] = ["甲", "乙", "丙", "丁", "戊", "己", "庚", "辛", "壬", "癸"];
const EARTHLY_BRANCHES: [&str; 12] = [
    "子", "丑", "寅", "卯", "辰", "巳", "午", "未", "申", "酉", "戌", "亥",
];
const ZODIAC: [&str; 12] = [
    "鼠", "牛", "虎", "兔", "龙", "蛇", "马", "羊", "猴", "鸡", "狗", "猪",
];
const MONTH_NAMES: [&str; 12] = [
    "正月", "二月", "三月", "四月", "五月", "六月", "七月", "八月", "九月", "十月", "冬月", "腊月",
];
const DAY_NAMES: [&str; 30] = [
    "初一", "初二", "初三", "初四", "初五", "初六", "初七", "初八", "初九", "初十",
    "十一", "十二", "十三", "十四", "十五", "十六", "十七", "十八", "十九", "二十",
    "廿一", "廿二", "廿三", "廿四", "廿五", "廿六", "廿七", "廿八", "廿九", "三十",
];

/// Fixed-date traditional festivals (month, day, name).
const FESTIVALS: [(u32, u32, &str); 10] = [
    (1, 1, "春节"),
    (1, 15, "元宵节"),
    (2, 2, "龙抬头"),
    (5, 5, "端午节"),
    (7, 7, "七夕节"),
    (7, 15, "中元节"),
    (8, 15, "中秋节"),
    (9, 9, "重阳节"),
    (12, 8, "腊八节"),
    (12, 23, "小年"),
];

const NEW_YEARS_EVE: &str = "除夕";

/// Display information for one solar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LunarDayInfo {
    pub solar: NaiveDate,
    pub lunar: LunarDate,
    pub year_ganzhi: String,
    pub month_ganzhi: String,
    pub day_ganzhi: String,
    pub zodiac: &'static str,
    pub month_name: String,
    pub day_name: &'static str,
    pub festival: Option<&'static str>,
}

/// Names, gan-zhi and festival for a solar date in the supported range.
pub fn day_info(date: NaiveDate) -> Option<LunarDayInfo> {
    let lunar = solar_to_lunar(date)?;
    let year_index = (lunar.year - 4).rem_euclid(60) as usize;
    let month_stem = (lunar.year as i64 * 12 + lunar.month as i64 + 3).rem_euclid(10) as usize;
    let month_branch = ((lunar.month + 1) % 12) as usize;
    let jdn = julian_day_number(date);

    Some(LunarDayInfo {
        solar: date,
        lunar,
        year_ganzhi: format!(
            "{}{}",
            HEAVENLY_STEMS[year_index % 10],
            EARTHLY_BRANCHES[year_index % 12]
        ),
        month_ganzhi: format!("{}{}", HEAVENLY_STEMS[month_stem], EARTHLY_BRANCHES[month_branch]),
        day_ganzhi: format!(
            "{}{}",
            HEAVENLY_STEMS[(jdn + 9).rem_euclid(10) as usize],
            EARTHLY_BRANCHES[(jdn + 1).rem_euclid(12) as usize]
        ),
        zodiac: ZODIAC[year_index % 12],
        month_name: month_name(lunar.month, lunar.leap),
        day_name: DAY_NAMES[(lunar.day as usize).clamp(1, 30) - 1],
        festival: festival(&lunar),
    })
}

pub(super) fn month_name(month: u32, leap: bool) -> String {
    let name = MONTH_NAMES[(month as usize).clamp(1, 12) - 1];
    if leap {
        format!("闰{}", name)
    } else {
        name.to_string()
    }
}

fn festival(lunar: &LunarDate) -> Option<&'static str> {
    if lunar.leap {
        return None;
    }

    if lunar.month == 12 {
        let last_day = lunar_month(lunar.year, 12, false).map(|m| m.days);
        if last_day == Some(lunar.day) {
            return Some(NEW_YEARS_EVE);
        }
    }

    FESTIVALS
        .iter()
        .find(|(month, day, _)| *month == lunar.month && *day == lunar.day)
        .map(|(_, _, name)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_spring_festival_2024() {
        let info = day_info(date(2024, 2, 10)).unwrap();
        assert_eq!(info.year_ganzhi, "甲辰");
        assert_eq!(info.month_ganzhi, "丙寅");
        assert_eq!(info.day_ganzhi, "甲辰");
        assert_eq!(info.zodiac, "龙");
        assert_eq!(info.month_name, "正月");
        assert_eq!(info.day_name, "初一");
        assert_eq!(info.festival, Some("春节"));
    }

    #[test]
    fn test_new_years_eve() {
        let info = day_info(date(2024, 2, 9)).unwrap();
        assert_eq!(info.festival, Some("除夕"));
        assert_eq!(info.month_name, "腊月");
        assert_eq!(info.day_name, "三十");
    }

    #[test]
    fn test_leap_month_name() {
        let info = day_info(date(2023, 3, 22)).unwrap();
        assert_eq!(info.month_name, "闰二月");
        assert_eq!(info.festival, None);
    }

    #[test]
    fn test_mid_autumn() {
        assert_eq!(day_info(date(2024, 9, 17)).unwrap().festival, Some("中秋节"));
    }
}
