use super::constants::*;

// Van Wagner, C.E. (1987). Development and structure of the Canadian Forest Fire
// Weather Index System. Forestry Technical Report 35.
// Units: temperature [°C], relative humidity [%], wind speed [km/h], rain [mm/24h]
// Clamps are written as comparisons so that NaN flows through to the caller.

// FFMC MODULE
pub fn from_ffmc_to_moisture(ffmc: f64) -> f64 {
    (FFMC_S1 * (101.0 - ffmc)) / (FFMC_S2 + ffmc)
}

pub fn from_moisture_to_ffmc(moisture: f64) -> f64 {
    (FFMC_S2 * (FFMC_MAX_MOISTURE - moisture)) / (FFMC_S1 + moisture)
}

pub fn moisture_rain_effect(moisture: f64, rain: f64) -> f64 {
    let rain_eff: f64 = rain - FFMC_MIN_RAIN;
    let wetting: f64 = FFMC_R1
        * rain_eff
        * f64::exp(-100.0 / (251.0 - moisture))
        * (1.0 - f64::exp(-FFMC_R2 / rain_eff));
    let mut moisture_new: f64 = if moisture > FFMC_NORMAL_COND {
        // sovra-saturation conditions
        (moisture + wetting)
            + (FFMC_R3 * f64::powf(moisture - FFMC_NORMAL_COND, 2.0)) * f64::sqrt(rain_eff)
    } else {
        moisture + wetting
    };
    if moisture_new > FFMC_MAX_MOISTURE {
        moisture_new = FFMC_MAX_MOISTURE;
    }
    moisture_new
}

/// log drying rate of the fine fuels
fn log_drying_rate(hum: f64, w_speed: f64, temp: f64) -> f64 {
    let k0: f64 = FFMC_B1 * (1.0 - f64::powf(hum / 100.0, FFMC_B2))
        + (FFMC_B3 * f64::sqrt(w_speed)) * (1.0 - f64::powf(hum / 100.0, FFMC_B5));
    k0 * (FFMC_B6 * f64::exp(FFMC_B7 * temp))
}

pub fn update_ffmc(temp: f64, hum: f64, w_speed: f64, rain: f64, ffmc: f64) -> f64 {
    let mut moisture: f64 = from_ffmc_to_moisture(ffmc);
    if rain > FFMC_MIN_RAIN {
        moisture = moisture_rain_effect(moisture, rain);
    }
    let emc_dry: f64 = FFMC_A1D * f64::powf(hum, FFMC_A2D)
        + (FFMC_A3D * f64::exp((hum - 100.0) / 10.0))
        + FFMC_A4 * (21.1 - temp) * (1.0 - 1.0 / f64::exp(FFMC_A5 * hum));

    let moisture_new: f64 = if moisture > emc_dry {
        // drying process
        let k_dry = log_drying_rate(hum, w_speed, temp);
        emc_dry + (moisture - emc_dry) / f64::powf(10.0, k_dry)
    } else {
        let emc_wet: f64 = FFMC_A1W * f64::powf(hum, FFMC_A2W)
            + (FFMC_A3W * f64::exp((hum - 100.0) / 10.0))
            + FFMC_A4 * (21.1 - temp) * (1.0 - 1.0 / f64::exp(FFMC_A5 * hum));
        if moisture < emc_wet {
            // wetting process
            let k_wet = log_drying_rate(100.0 - hum, w_speed, temp);
            emc_wet - (emc_wet - moisture) / f64::powf(10.0, k_wet)
        } else {
            moisture
        }
    };

    let mut ffmc_new: f64 = from_moisture_to_ffmc(moisture_new);
    if ffmc_new > FFMC_MAX {
        ffmc_new = FFMC_MAX;
    }
    if ffmc_new < 0.0 {
        ffmc_new = 0.0;
    }
    ffmc_new
}

// DMC MODULE
/// Effective day-length of the month, NaN outside 1..=12
pub fn dmc_day_length(month: u32) -> f64 {
    match month {
        1..=12 => DMC_DAY_LENGTH[(month - 1) as usize],
        _ => f64::NAN,
    }
}

pub fn dmc_rain_effect(dmc: f64, rain: f64) -> f64 {
    let rw: f64 = DMC_R1 * rain - DMC_R2;
    let wmi: f64 = DMC_R9 + DMC_R10 / f64::exp(DMC_R11 * dmc);
    let b: f64 = if dmc > DMC_A1 {
        if dmc > DMC_A2 {
            DMC_R7 * f64::ln(dmc) - DMC_R8
        } else {
            DMC_R5 - DMC_R6 * f64::ln(dmc)
        }
    } else {
        100.0 / (DMC_R3 + DMC_R4 * dmc)
    };
    let wmr: f64 = wmi + (1e3 * rw) / (DMC_R12 + b * rw);
    DMC_R13 * (DMC_R14 - f64::ln(wmr - DMC_R9))
}

pub fn update_dmc(temp: f64, hum: f64, rain: f64, month: u32, dmc: f64) -> f64 {
    let mut temp = temp;
    if temp < DMC_MIN_TEMP {
        temp = DMC_MIN_TEMP;
    }
    // temperature effect
    let rk: f64 = DMC_T1 * (temp + DMC_T2) * (100.0 - hum) * (dmc_day_length(month) * 1e-4);

    let mut pr: f64 = dmc;
    if rain > DMC_MIN_RAIN {
        pr = dmc_rain_effect(dmc, rain);
    }
    if pr < 0.0 {
        pr = 0.0;
    }
    let mut dmc_new: f64 = pr + rk;
    if dmc_new < DMC_MIN {
        dmc_new = DMC_MIN;
    }
    dmc_new
}

// DC MODULE
/// Day-length factor of the month, NaN outside 1..=12
pub fn dc_month_factor(month: u32) -> f64 {
    match month {
        1..=12 => DC_MONTH_FACTOR[(month - 1) as usize],
        _ => f64::NAN,
    }
}

/// Drought code after the rain recharge, before the evapotranspiration of the day
pub fn dc_rain_effect(dc: f64, rain: f64) -> f64 {
    let rw: f64 = DC_R1 * rain - DC_R2;
    let smi: f64 = DC_R3 * f64::exp(-dc / DC_R4);
    dc - DC_R4 * f64::ln(1.0 + ((DC_R5 * rw) / smi))
}

pub fn update_dc(temp: f64, rain: f64, month: u32, dc: f64) -> f64 {
    let mut temp = temp;
    if temp < DC_MIN_TEMP {
        temp = DC_MIN_TEMP;
    }
    // potential evapotranspiration
    let mut pe: f64 = (DC_T1 * (temp + DC_T2) + dc_month_factor(month)) / 2.0;
    if pe < 0.0 {
        pe = 0.0;
    }

    let mut dc_new: f64 = pe;
    if rain > DC_MIN_RAIN {
        let dr = dc_rain_effect(dc, rain);
        if dr > 0.0 {
            dc_new += dr;
        }
    } else {
        dc_new += dc;
    }
    dc_new
}

// ISI MODULE
pub fn compute_isi(ffmc: f64, w_speed: f64) -> f64 {
    let moisture: f64 = from_ffmc_to_moisture(ffmc);
    let ff: f64 =
        ISI_A1 * f64::exp(moisture * ISI_A2) * (1.0 + f64::powf(moisture, ISI_A3) / ISI_A4);
    ff * f64::exp(ISI_A0 * w_speed)
}

// BUI MODULE
pub fn compute_bui(dmc: f64, dc: f64) -> f64 {
    let mut bui: f64 = if dmc > BUI_A1 {
        dmc - (1.0 - BUI_A2 * dc / (dmc + BUI_A1 * dc))
            * (BUI_A3 + f64::powf(BUI_A4 * dmc, BUI_A5))
    } else {
        // low duff moisture
        (BUI_A2 * dc * dmc) / (dmc + BUI_A1 * dc)
    };
    if bui < 0.0 {
        bui = 0.0;
    }
    bui
}

// FWI MODULE
pub fn compute_fwi(isi: f64, bui: f64) -> f64 {
    let bb: f64 = if bui > FWI_BUI_THRESHOLD {
        0.1 * isi * (1e3 / (FWI_A4 + FWI_A5 / f64::exp(FWI_A6 * bui)))
    } else {
        0.1 * isi * (FWI_A1 * f64::powf(bui, FWI_A2) + FWI_A3)
    };
    if bb > 1.0 {
        f64::exp(FWI_A7 * f64::powf(FWI_A8 * f64::ln(bb), FWI_A9))
    } else {
        bb
    }
}
