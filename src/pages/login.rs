//! Sign-in screen

use iced::widget::{button, center, column, container, text, text_input};
use iced::{Alignment, Element, Length};

use crate::app::Message;
use crate::forms::{Field, FieldErrors, LoginForm};
use crate::query::Mutation;
use crate::ui::{self, theme::DarkTheme};

pub struct LoginPage {
    pub form: LoginForm,
    pub errors: FieldErrors,
    pub submit: Mutation,
}

impl LoginPage {
    pub fn new(submit: Mutation) -> Self {
        Self {
            form: LoginForm::default(),
            errors: FieldErrors::default(),
            submit,
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        let pending = self.submit.is_pending();

        let input = text_input("admin@example.com", &self.form.email)
            .padding(10)
            .size(15);
        let input = if pending {
            input
        } else {
            input.on_input(Message::EmailChanged).on_submit(Message::SubmitLogin)
        };

        let label = if pending { "Signing in..." } else { "Sign in" };
        let submit = button(container(text(label)).center_x(Length::Fill))
            .width(Length::Fill)
            .padding(10)
            .style(button::primary)
            .on_press_maybe((!pending).then_some(Message::SubmitLogin));

        let form = ui::card(
            column![
                ui::field("Email address", input, self.errors.get(Field::Email)),
                submit,
            ]
            .spacing(20),
        );

        center(
            column![
                text("Sign in to your account").size(28).color(DarkTheme::TEXT),
                text("Enter your email to access the dashboard")
                    .size(14)
                    .color(DarkTheme::TEXT_MUTED),
                form,
            ]
            .spacing(16)
            .max_width(420)
            .align_x(Alignment::Center),
        )
        .into()
    }
}
