pub enum Action {
    EndSession(),
    RestartSession(),
    StartSession(),
    SubmitUserText(String),
}
