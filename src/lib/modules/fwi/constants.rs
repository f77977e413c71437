// Start-of-season codes
pub const FFMC_INIT: f64 = 85.0;
pub const DMC_INIT: f64 = 6.0;
pub const DC_INIT: f64 = 15.0;

// FFMC CONSTANTS
pub const FFMC_MAX: f64 = 101.0;
pub const FFMC_S1: f64 = 147.2;
pub const FFMC_S2: f64 = 59.5;
pub const FFMC_MAX_MOISTURE: f64 = 250.0;
// Rain phase constants
pub const FFMC_MIN_RAIN: f64 = 0.5; // daily cumulated rain (mm)
pub const FFMC_NORMAL_COND: f64 = 150.0;
pub const FFMC_R1: f64 = 42.5;
pub const FFMC_R2: f64 = 6.93;
pub const FFMC_R3: f64 = 0.0015;
// No-rain phase constants
pub const FFMC_A1D: f64 = 0.942;
pub const FFMC_A2D: f64 = 0.679;
pub const FFMC_A3D: f64 = 11.0;
pub const FFMC_A1W: f64 = 0.618;
pub const FFMC_A2W: f64 = 0.753;
pub const FFMC_A3W: f64 = 10.0;
pub const FFMC_A4: f64 = 0.18;
pub const FFMC_A5: f64 = 0.115;
pub const FFMC_B1: f64 = 0.424;
pub const FFMC_B2: f64 = 1.7;
pub const FFMC_B3: f64 = 0.0694;
pub const FFMC_B5: f64 = 8.0;
pub const FFMC_B6: f64 = 0.581;
pub const FFMC_B7: f64 = 0.0365;

// DMC CONSTANTS
// rain effect
pub const DMC_MIN_RAIN: f64 = 1.5;
pub const DMC_A1: f64 = 33.0;
pub const DMC_A2: f64 = 65.0;
pub const DMC_R1: f64 = 0.92;
pub const DMC_R2: f64 = 1.27;
pub const DMC_R3: f64 = 0.5;
pub const DMC_R4: f64 = 0.3;
pub const DMC_R5: f64 = 14.0;
pub const DMC_R6: f64 = 1.3;
pub const DMC_R7: f64 = 6.2;
pub const DMC_R8: f64 = 17.2;
pub const DMC_R9: f64 = 20.0;
pub const DMC_R10: f64 = 280.0;
pub const DMC_R11: f64 = 0.023;
pub const DMC_R12: f64 = 48.77;
pub const DMC_R13: f64 = 43.43;
pub const DMC_R14: f64 = 5.6348;
// temperature effect
pub const DMC_MIN_TEMP: f64 = -1.1;
pub const DMC_T1: f64 = 1.894;
pub const DMC_T2: f64 = 1.1;
pub const DMC_MIN: f64 = 1.0;
/// effective day-length factor, January to December
pub const DMC_DAY_LENGTH: [f64; 12] = [6.5, 7.5, 9.0, 12.8, 13.9, 13.9, 12.4, 10.9, 9.4, 8.0, 7.0, 6.0];

// DC CONSTANTS
// rain effect
pub const DC_MIN_RAIN: f64 = 2.8;
pub const DC_R1: f64 = 0.83;
pub const DC_R2: f64 = 1.27;
pub const DC_R3: f64 = 800.0;
pub const DC_R4: f64 = 400.0;
pub const DC_R5: f64 = 3.937;
// temperature effect
pub const DC_MIN_TEMP: f64 = -2.8;
pub const DC_T1: f64 = 0.36;
pub const DC_T2: f64 = 2.8;
/// day-length adjustment of potential evapotranspiration, January to December
pub const DC_MONTH_FACTOR: [f64; 12] = [-1.6, -1.6, -1.6, 0.9, 3.8, 5.8, 6.4, 5.0, 2.4, 0.4, -1.6, -1.6];

// ISI CONSTANTS
pub const ISI_A0: f64 = 0.05039;
pub const ISI_A1: f64 = 19.115;
pub const ISI_A2: f64 = -0.1386;
pub const ISI_A3: f64 = 5.31;
pub const ISI_A4: f64 = 4.93e7;

// BUI CONSTANTS
pub const BUI_A1: f64 = 0.4;
pub const BUI_A2: f64 = 0.8;
pub const BUI_A3: f64 = 0.92;
pub const BUI_A4: f64 = 0.0114;
pub const BUI_A5: f64 = 1.7;

// FWI CONSTANTS
pub const FWI_BUI_THRESHOLD: f64 = 80.0;
pub const FWI_A1: f64 = 0.626;
pub const FWI_A2: f64 = 0.809;
pub const FWI_A3: f64 = 2.0;
pub const FWI_A4: f64 = 25.0;
pub const FWI_A5: f64 = 108.64;
pub const FWI_A6: f64 = 0.023;
pub const FWI_A7: f64 = 2.72;
pub const FWI_A8: f64 = 0.434;
pub const FWI_A9: f64 = 0.647;
