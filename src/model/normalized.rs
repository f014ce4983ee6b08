use std::fmt;
use std::str::FromStr;

/// Normalized MLFM values for one measurement, plus passthrough weather.
///
/// All MLFM channels are dimensionless and sit near 1.0 for a healthy
/// module at STC.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedRow {
    pub date_time: String,
    pub gti_kw_m2: f64,
    pub temperature_air: f64,
    pub temperature_module: f64,
    pub wind_speed: f64,

    pub isc: f64,
    pub rsc: f64,
    pub ffi: f64,
    pub ffv: f64,
    pub roc: f64,
    pub voc: f64,
    pub imp: f64,
    pub vmp: f64,
    /// DC performance ratio, not temperature corrected.
    pub prdc: f64,

    /// Measured I at Vmp/2 over the Isc/Rsc extrapolation.
    pub icurve: f64,
    /// Measured V at Imp/2 over the Voc/Roc extrapolation.
    pub vcurve: f64,

    pub isc_tcorr: f64,
    pub voc_tcorr: f64,
    pub prdc_tcorr: f64,
}

impl NormalizedRow {
    /// Returns the value of a numeric column.
    pub fn value(&self, channel: Channel) -> f64 {
        match channel {
            Channel::Isc => self.isc,
            Channel::Rsc => self.rsc,
            Channel::Ffi => self.ffi,
            Channel::Ffv => self.ffv,
            Channel::Roc => self.roc,
            Channel::Voc => self.voc,
            Channel::Imp => self.imp,
            Channel::Vmp => self.vmp,
            Channel::Prdc => self.prdc,
            Channel::Icurve => self.icurve,
            Channel::Vcurve => self.vcurve,
            Channel::IscTcorr => self.isc_tcorr,
            Channel::VocTcorr => self.voc_tcorr,
            Channel::PrdcTcorr => self.prdc_tcorr,
            Channel::GtiKwM2 => self.gti_kw_m2,
            Channel::TemperatureAir => self.temperature_air,
            Channel::TemperatureModule => self.temperature_module,
            Channel::WindSpeed => self.wind_speed,
        }
    }

    /// Product of the six multiplicative loss factors.
    ///
    /// Equals `prdc * ff_ref` up to rounding.
    pub fn loss_factor_product(&self) -> f64 {
        self.isc * self.rsc * self.ffi * self.ffv * self.roc * self.voc
    }
}

/// A numeric column of a [`NormalizedRow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Isc,
    Rsc,
    Ffi,
    Ffv,
    Roc,
    Voc,
    Imp,
    Vmp,
    Prdc,
    Icurve,
    Vcurve,
    IscTcorr,
    VocTcorr,
    PrdcTcorr,
    GtiKwM2,
    TemperatureAir,
    TemperatureModule,
    WindSpeed,
}

impl Channel {
    /// The fourteen MLFM channels, in export order.
    pub const MLFM: [Channel; 14] = [
        Channel::Isc,
        Channel::Rsc,
        Channel::Ffi,
        Channel::Ffv,
        Channel::Roc,
        Channel::Voc,
        Channel::Imp,
        Channel::Vmp,
        Channel::Prdc,
        Channel::Icurve,
        Channel::Vcurve,
        Channel::IscTcorr,
        Channel::VocTcorr,
        Channel::PrdcTcorr,
    ];

    /// Passthrough weather channels, in export order.
    pub const WEATHER: [Channel; 4] = [
        Channel::GtiKwM2,
        Channel::TemperatureAir,
        Channel::TemperatureModule,
        Channel::WindSpeed,
    ];

    /// Column name as used in exported tables.
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Isc => "isc",
            Channel::Rsc => "rsc",
            Channel::Ffi => "ffi",
            Channel::Ffv => "ffv",
            Channel::Roc => "roc",
            Channel::Voc => "voc",
            Channel::Imp => "imp",
            Channel::Vmp => "vmp",
            Channel::Prdc => "prdc",
            Channel::Icurve => "icurve",
            Channel::Vcurve => "vcurve",
            Channel::IscTcorr => "isc_tcorr",
            Channel::VocTcorr => "voc_tcorr",
            Channel::PrdcTcorr => "prdc_tcorr",
            Channel::GtiKwM2 => "gti_kw_m2",
            Channel::TemperatureAir => "temperature_air",
            Channel::TemperatureModule => "temperature_module",
            Channel::WindSpeed => "wind_speed",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Channel::MLFM
            .iter()
            .chain(Channel::WEATHER.iter())
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown channel \"{s}\""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_names_parse_back() {
        for c in Channel::MLFM.iter().chain(Channel::WEATHER.iter()) {
            assert_eq!(c.as_str().parse::<Channel>(), Ok(*c));
        }
    }

    #[test]
    fn unknown_channel_rejected() {
        assert!("pmp".parse::<Channel>().is_err());
    }

    #[test]
    fn value_reads_matching_field() {
        let row = NormalizedRow {
            ffv: 0.93,
            temperature_module: 41.0,
            ..NormalizedRow::default()
        };
        assert_eq!(row.value(Channel::Ffv), 0.93);
        assert_eq!(row.value(Channel::TemperatureModule), 41.0);
    }
}
