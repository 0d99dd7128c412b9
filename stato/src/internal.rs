mod action_loop;
mod command;
mod command_sender;
mod effect_controller;
mod subscriber;
mod subscription;

pub(crate) use action_loop::{ActionLoop, Listener};
pub(crate) use command::Command;
pub(crate) use command_sender::CommandSender;
pub(crate) use effect_controller::EffectController;
pub(crate) use subscriber::Subscriber;
pub(crate) use subscription::Subscription;
