//! GPIO lines backed by rppal.
use rppal::gpio::{Gpio, InputPin, OutputPin};

use crate::error::{HwError, Result};
use currlog_traits::{InputLine, OutputLine};

pub struct GpioOutput(OutputPin);

pub struct GpioInput {
    pin: InputPin,
    active_low: bool,
}

pub fn open_output(gpio: &Gpio, pin: u8) -> Result<GpioOutput> {
    let p = gpio
        .get(pin)
        .map_err(|e| HwError::Gpio(format!("open output pin {pin}: {e}")))?
        .into_output_low();
    Ok(GpioOutput(p))
}

pub fn open_input(gpio: &Gpio, pin: u8, active_low: bool) -> Result<GpioInput> {
    let p = gpio
        .get(pin)
        .map_err(|e| HwError::Gpio(format!("open input pin {pin}: {e}")))?;
    let pin = if active_low {
        p.into_input_pullup()
    } else {
        p.into_input_pulldown()
    };
    Ok(GpioInput { pin, active_low })
}

pub fn open_gpio() -> Result<Gpio> {
    Gpio::new().map_err(|e| HwError::Gpio(format!("open gpio: {e}")))
}

impl OutputLine for GpioOutput {
    fn set(&mut self, high: bool) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if high {
            self.0.set_high();
        } else {
            self.0.set_low();
        }
        Ok(())
    }
}

impl InputLine for GpioInput {
    fn is_active(&mut self) -> std::result::Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.pin.is_low() == self.active_low)
    }
}
