use std::str::FromStr;

use transport::devices::AddRequest;
use transport::{DeviceId, RelaySlot};

use crate::Error;

pub const USAGE: &str = "\
commands:
  devices                         reload the device list
  on <device> <relay>             switch a relay on
  off <device> <relay>            switch a relay off
  all-on <device>                 switch every relay on
  all-off <device>                switch every relay off
  focus <device>                  poll power telemetry of a device
  unfocus                         stop polling telemetry
  refresh <device>                fetch relay states once
  power <device> <relay>=<watts>  set nominal power ratings
  add <device> <name> [ssid] [password]
                                  register a device
  delete <device>                 remove a device
  rate                            fetch the electricity rate
  help
  quit";

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Devices,
    Switch {
        device_id: DeviceId,
        slot: RelaySlot,
        on: bool,
    },
    SwitchAll {
        device_id: DeviceId,
        on: bool,
    },
    Focus(DeviceId),
    Unfocus,
    Refresh(DeviceId),
    Power {
        device_id: DeviceId,
        ratings: Vec<(RelaySlot, f64)>,
    },
    Add(AddRequest),
    Delete(DeviceId),
    Rate,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();

        let Some(name) = words.next() else {
            return Err(Error::MissingArgument("command"));
        };

        let command = match name {
            "devices" | "ls" => Command::Devices,
            "on" | "off" => Command::Switch {
                device_id: device(&mut words)?,
                slot: slot(words.next())?,
                on: name == "on",
            },
            "all-on" | "all-off" => Command::SwitchAll {
                device_id: device(&mut words)?,
                on: name == "all-on",
            },
            "focus" => Command::Focus(device(&mut words)?),
            "unfocus" => Command::Unfocus,
            "refresh" => Command::Refresh(device(&mut words)?),
            "power" => {
                let device_id = device(&mut words)?;
                let ratings = words.map(rating).collect::<Result<Vec<_>, _>>()?;

                if ratings.is_empty() {
                    return Err(Error::MissingArgument("<relay>=<watts>"));
                }

                Command::Power { device_id, ratings }
            }
            "add" => {
                let device_id = device(&mut words)?;
                let name = words.next().ok_or(Error::MissingArgument("<name>"))?;

                Command::Add(AddRequest {
                    name: name.to_string(),
                    device_id,
                    ssid: words.next().unwrap_or_default().to_string(),
                    password: words.next().unwrap_or_default().to_string(),
                })
            }
            "delete" | "rm" => Command::Delete(device(&mut words)?),
            "rate" => Command::Rate,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(Error::UnknownCommand(other.to_string())),
        };

        Ok(command)
    }
}

fn device<'a>(words: &mut impl Iterator<Item = &'a str>) -> Result<DeviceId, Error> {
    words
        .next()
        .map(DeviceId::from)
        .ok_or(Error::MissingArgument("<device>"))
}

fn slot(word: Option<&str>) -> Result<RelaySlot, Error> {
    let word = word.ok_or(Error::MissingArgument("<relay>"))?;
    word.parse()
        .map_err(|_| Error::InvalidArgument(word.to_string()))
}

fn rating(word: &str) -> Result<(RelaySlot, f64), Error> {
    let invalid = || Error::InvalidArgument(word.to_string());

    let (slot, watts) = word.split_once('=').ok_or_else(invalid)?;
    let slot: RelaySlot = slot.parse().map_err(|_| invalid())?;
    let watts: f64 = watts.parse().map_err(|_| invalid())?;

    Ok((slot, watts))
}
